diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        email -> Varchar,
        password -> Varchar,
        role -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        category -> Varchar,
        price -> Float8,
        stock -> Int4,
        image_url -> Nullable<Text>,
        description -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    orders (id) {
        id -> Int4,
        user_id -> Int4,
        total_amount -> Float8,
        status -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    order_items (id) {
        id -> Int4,
        order_id -> Int4,
        product_id -> Int4,
        quantity -> Int4,
        price_per_unit -> Float8,
        total_price -> Float8,
    }
}

diesel::table! {
    loans (id) {
        id -> Int4,
        user_id -> Int4,
        amount -> Float8,
        interest_rate -> Float8,
        term_months -> Int4,
        #[sql_name = "type"]
        loan_type -> Varchar,
        status -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    weather_alerts (id) {
        id -> Int4,
        #[sql_name = "type"]
        alert_type -> Varchar,
        severity -> Varchar,
        description -> Text,
        start_date -> Timestamp,
        end_date -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::joinable!(orders -> users (user_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(order_items -> products (product_id));
diesel::joinable!(loans -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    products,
    orders,
    order_items,
    loans,
    weather_alerts,
);
