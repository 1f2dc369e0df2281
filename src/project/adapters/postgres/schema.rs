//! Diesel schema for project persistence.

diesel::table! {
    /// Projects with their routing snapshot.
    projects (id) {
        /// Project slug.
        #[max_length = 64]
        id -> Varchar,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Embedded routing configuration.
        routing -> Jsonb,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
