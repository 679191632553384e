diesel::table! {
    datasets (id) {
        id -> Text,
        owner_id -> Int8,
        filename -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    equipment_rows (id) {
        id -> Int8,
        dataset_id -> Text,
        row_index -> Int4,
        name -> Text,
        equipment_type -> Text,
        flowrate -> Float8,
        pressure -> Float8,
        temperature -> Float8,
    }
}

diesel::joinable!(equipment_rows -> datasets (dataset_id));

diesel::allow_tables_to_appear_in_same_query!(datasets, equipment_rows);
