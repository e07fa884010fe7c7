//! Diesel schema for task and offer persistence.

diesel::table! {
    /// Marketplace tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Poster user identifier.
        #[max_length = 128]
        poster_id -> Varchar,
        /// Poster display name.
        #[max_length = 255]
        poster_name -> Varchar,
        /// Headline.
        title -> Text,
        /// Free-text description.
        description -> Text,
        /// Category name.
        #[max_length = 32]
        category -> Varchar,
        /// Postal code.
        #[max_length = 32]
        zip_code -> Varchar,
        /// Public area description.
        area_description -> Text,
        /// Private street address.
        full_address -> Text,
        /// Price in cents.
        price_cents -> Int8,
        /// Whether completion needs a proof photo.
        photo_required -> Bool,
        /// Six-character confirmation code.
        #[max_length = 6]
        confirmation_code -> Varchar,
        /// Flat lifecycle status derived from `state`.
        #[max_length = 32]
        status -> Varchar,
        /// Bound helper, set only while a helper is assigned.
        #[max_length = 128]
        helper_id -> Nullable<Varchar>,
        /// Current checkout session, for webhook lookup.
        #[max_length = 255]
        checkout_session_id -> Nullable<Varchar>,
        /// Checkout link payload.
        checkout -> Nullable<Jsonb>,
        /// Tagged lifecycle state payload.
        state -> Jsonb,
        /// Compare-and-set version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Helper offers on tasks.
    offers (id) {
        /// Offer identifier.
        id -> Uuid,
        /// Parent task.
        task_id -> Uuid,
        /// Offering helper.
        #[max_length = 128]
        helper_id -> Varchar,
        /// Helper display name.
        #[max_length = 255]
        helper_name -> Varchar,
        /// Helper's note.
        note -> Text,
        /// Optional counter-price in cents.
        proposed_price_cents -> Nullable<Int8>,
        /// Offer status.
        #[max_length = 32]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(offers -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, offers);
