//! Diesel schema for common record persistence.

diesel::table! {
    /// Shared relation for records from unregistered tools.
    common_records (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Tool that sent the record.
        #[max_length = 50]
        tool_name -> Varchar,
        /// Free-form record data.
        data -> Jsonb,
        /// Sensitivity flag (`0` public, `1` sensitive).
        sensitive -> Int2,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
