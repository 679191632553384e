fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_prost_build::configure()
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .compile_protos(&["proto/equipment.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/equipment.proto");
    println!("cargo:rerun-if-changed=migrations");

    Ok(())
}
