diesel::table! {
    crm_webhook_events (id) {
        id -> Int4,
        kind -> Varchar,
        account_id -> Nullable<Varchar>,
        payload -> Jsonb,
        received_at -> Timestamptz,
    }
}

diesel::table! {
    districts (id) {
        id -> Int4,
        name -> Varchar,
        description -> Nullable<Text>,
        is_active -> Bool,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    drivers (id) {
        id -> Int4,
        name -> Varchar,
        phone -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    leads (id) {
        id -> Int8,
        info -> Jsonb,
        delivery_date -> Nullable<Date>,
        delivery_time -> Nullable<Varchar>,
        products -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    production_orders (id) {
        id -> Int4,
        product_id -> Int4,
        lead_id -> Int8,
        quantity -> Int4,
        production_date -> Date,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    production_sessions (id) {
        id -> Int4,
        session_date -> Date,
        time_slot -> Varchar,
        produced_units -> Int4,
        available_bottles -> Int4,
        notes -> Nullable<Text>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        product_type -> Varchar,
        volume -> Nullable<Numeric>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    truck_assignments (id) {
        id -> Int4,
        lead_id -> Int8,
        delivery_date -> Date,
        truck_name -> Varchar,
        delivery_time -> Nullable<Varchar>,
        status -> Varchar,
        assigned_by -> Nullable<Varchar>,
        assigned_at -> Timestamptz,
        notes -> Nullable<Text>,
    }
}

diesel::joinable!(production_orders -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    crm_webhook_events,
    districts,
    drivers,
    leads,
    production_orders,
    production_sessions,
    products,
    truck_assignments,
);
