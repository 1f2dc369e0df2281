//! Diesel schema for task and handoff persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project slug.
        #[max_length = 64]
        project_id -> Varchar,
        /// Source plan, if any.
        plan_id -> Nullable<Uuid>,
        /// Title.
        title -> Text,
        /// Description.
        description -> Text,
        /// Ordered acceptance criteria as a JSON array of strings.
        acceptance_criteria -> Jsonb,
        /// Routing category.
        #[max_length = 50]
        category -> Varchar,
        /// Owner role.
        #[max_length = 20]
        owner -> Varchar,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Ordered dependency ids as a JSON array of UUID strings.
        depends_on -> Jsonb,
        /// Priority; higher is more urgent.
        priority -> Int4,
        /// Completion output.
        output -> Nullable<Text>,
        /// Append-only log as a JSON array of strings.
        logs -> Jsonb,
        /// Waiting reason while blocked.
        waiting_reason -> Nullable<Text>,
        /// Claim holder.
        #[max_length = 20]
        claimed_by -> Nullable<Varchar>,
        /// Creator role.
        #[max_length = 255]
        created_by -> Nullable<Varchar>,
        /// Optimistic concurrency counter.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable handoff records.
    handoffs (id) {
        /// Handoff identifier.
        id -> Uuid,
        /// Completed source task.
        from_task_id -> Uuid,
        /// Recipient task; null for audit-only records.
        to_task_id -> Nullable<Uuid>,
        /// Summary text.
        summary -> Text,
        /// Structured artifacts as a JSON array.
        artifacts -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, handoffs);
