//! Diesel schema for tool registry persistence.

diesel::table! {
    /// Durable registry of tools and their declared schemas.
    tool_registrations (id) {
        /// Internal tool identifier.
        id -> Uuid,
        /// Unique, case-sensitive tool name.
        #[max_length = 58]
        name -> Varchar,
        /// At-rest form of the per-tool token.
        token -> Text,
        /// Canonical schema as a JSON array of `{name, type}` objects.
        schema -> Jsonb,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}
