//! Diesel schema for routing template persistence.

diesel::table! {
    /// Routing templates with their rule sets.
    routing_templates (id) {
        /// Template identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Version label.
        #[max_length = 50]
        version -> Varchar,
        /// Owner rules and keyword matchers.
        rules -> Jsonb,
        /// Default flag; a partial unique index allows one `true` row.
        is_default -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
