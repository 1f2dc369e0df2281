//! Diesel schema for plan persistence.

diesel::table! {
    /// Plans and their raw text.
    plans (id) {
        /// Plan identifier.
        id -> Uuid,
        /// Owning project slug.
        #[max_length = 64]
        project_id -> Varchar,
        /// First non-empty line of the text.
        title -> Text,
        /// Raw plan text.
        description -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
