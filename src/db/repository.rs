use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::db::models::*;
use crate::db::schema::*;
use crate::error::{ApiError, ApiResult, Violations};
use crate::models::{round_cents, OrderLine, OrderStatus, PlacedOrder};

pub fn insert_user(conn: &mut PgConnection, new_user: &NewUser) -> QueryResult<i32> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(users::id)
        .get_result(conn)
}

pub fn find_user(conn: &mut PgConnection, id: i32) -> QueryResult<Option<User>> {
    users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Accounts are looked up by username and role together.
pub fn find_user_for_login(
    conn: &mut PgConnection,
    username: &str,
    role: &str,
) -> QueryResult<Option<User>> {
    users::table
        .filter(users::username.eq(username))
        .filter(users::role.eq(role))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn list_products(
    conn: &mut PgConnection,
    category: Option<&str>,
    search: Option<&str>,
) -> QueryResult<Vec<Product>> {
    let mut query = products::table.select(Product::as_select()).into_boxed();

    if let Some(category) = category {
        query = query.filter(products::category.eq(category.to_string()));
    }

    if let Some(term) = search {
        let pattern = format!("%{}%", term);
        query = query.filter(
            products::name
                .ilike(pattern.clone())
                .or(products::description.ilike(pattern)),
        );
    }

    query.order(products::name.asc()).load(conn)
}

pub fn get_product(conn: &mut PgConnection, id: i32) -> QueryResult<Product> {
    products::table
        .find(id)
        .select(Product::as_select())
        .first(conn)
}

pub fn insert_product(conn: &mut PgConnection, new_product: &NewProduct) -> QueryResult<i32> {
    diesel::insert_into(products::table)
        .values(new_product)
        .returning(products::id)
        .get_result(conn)
}

pub fn update_product(
    conn: &mut PgConnection,
    id: i32,
    changes: &UpdateProduct,
) -> QueryResult<Product> {
    diesel::update(products::table.find(id))
        .set((changes, products::updated_at.eq(Utc::now().naive_utc())))
        .returning(Product::as_returning())
        .get_result(conn)
}

pub fn list_orders_for_user(
    conn: &mut PgConnection,
    user_id: i32,
) -> QueryResult<Vec<OrderWithItems>> {
    let orders = orders::table
        .filter(orders::user_id.eq(user_id))
        .order((orders::created_at.desc(), orders::id.desc()))
        .select(Order::as_select())
        .load(conn)?;

    let items = OrderItem::belonging_to(&orders)
        .order(order_items::id.asc())
        .select(OrderItem::as_select())
        .load(conn)?;

    Ok(items
        .grouped_by(&orders)
        .into_iter()
        .zip(orders)
        .map(|(items, order)| OrderWithItems { order, items })
        .collect())
}

pub fn list_all_orders(conn: &mut PgConnection) -> QueryResult<Vec<OrderWithUsername>> {
    let rows: Vec<(Order, String)> = orders::table
        .inner_join(users::table)
        .order((orders::created_at.desc(), orders::id.desc()))
        .select((Order::as_select(), users::username))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(order, username)| OrderWithUsername { order, username })
        .collect())
}

/// Places an order for `user_id`. Prices are captured from the product rows at
/// this moment, and the order, its items and the stock decrements commit together.
pub fn place_order(
    conn: &mut PgConnection,
    user_id: i32,
    lines: &[OrderLine],
) -> ApiResult<PlacedOrder> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let mut locked = HashMap::new();
        for line in lines {
            if locked.contains_key(&line.product_id) {
                continue;
            }
            let product = products::table
                .find(line.product_id)
                .select(Product::as_select())
                .for_update()
                .first(conn)
                .optional()?;
            if let Some(p) = product {
                locked.insert(p.id, (p.stock, p.price));
            }
        }
        let priced = price_lines(lines, &locked)?;

        let total_amount = round_cents(
            priced
                .iter()
                .map(|(line, price)| line.quantity as f64 * price)
                .sum(),
        );

        let order_id: i32 = diesel::insert_into(orders::table)
            .values(&NewOrder {
                user_id,
                total_amount,
                status: OrderStatus::Pending.as_str().to_string(),
            })
            .returning(orders::id)
            .get_result(conn)?;

        let items: Vec<NewOrderItem> = priced
            .iter()
            .map(|(line, price)| NewOrderItem {
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price_per_unit: *price,
                total_price: round_cents(line.quantity as f64 * price),
            })
            .collect();
        diesel::insert_into(order_items::table)
            .values(&items)
            .execute(conn)?;

        for (line, _) in &priced {
            diesel::update(products::table.find(line.product_id))
                .set((
                    products::stock.eq(products::stock - line.quantity),
                    products::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
        }

        Ok(PlacedOrder {
            id: order_id,
            total_amount,
        })
    })
}

/// Pairs each line with its unit price. `stock` maps product id to
/// `(stock, price)`; a line fails when the running total requested for its
/// product exceeds that stock.
fn price_lines(
    lines: &[OrderLine],
    stock: &HashMap<i32, (i32, f64)>,
) -> ApiResult<Vec<(OrderLine, f64)>> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut requested: HashMap<i32, i64> = HashMap::new();
    let mut violations = Violations::new();

    for (i, line) in lines.iter().enumerate() {
        match stock.get(&line.product_id) {
            None => violations.push(format!("items[{i}].product_id"), "unknown product"),
            Some(&(available, price)) => {
                let total = requested.entry(line.product_id).or_insert(0);
                *total += i64::from(line.quantity);
                if *total > i64::from(available) {
                    violations.push(format!("items[{i}].quantity"), "insufficient stock");
                } else {
                    priced.push((*line, price));
                }
            }
        }
    }
    violations.finish()?;
    Ok(priced)
}

pub fn update_order_status(conn: &mut PgConnection, id: i32, status: &str) -> QueryResult<usize> {
    diesel::update(orders::table.find(id))
        .set((
            orders::status.eq(status),
            orders::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
}

pub fn list_loans_for_user(conn: &mut PgConnection, user_id: i32) -> QueryResult<Vec<Loan>> {
    loans::table
        .filter(loans::user_id.eq(user_id))
        .order((loans::created_at.desc(), loans::id.desc()))
        .select(Loan::as_select())
        .load(conn)
}

pub fn list_all_loans(conn: &mut PgConnection) -> QueryResult<Vec<LoanWithUsername>> {
    let rows: Vec<(Loan, String)> = loans::table
        .inner_join(users::table)
        .order((loans::created_at.desc(), loans::id.desc()))
        .select((Loan::as_select(), users::username))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(loan, username)| LoanWithUsername { loan, username })
        .collect())
}

pub fn insert_loan(conn: &mut PgConnection, new_loan: &NewLoan) -> QueryResult<i32> {
    diesel::insert_into(loans::table)
        .values(new_loan)
        .returning(loans::id)
        .get_result(conn)
}

pub fn update_loan_status(conn: &mut PgConnection, id: i32, status: &str) -> QueryResult<usize> {
    diesel::update(loans::table.find(id))
        .set((
            loans::status.eq(status),
            loans::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
}

pub fn list_weather_alerts(
    conn: &mut PgConnection,
    active_at: Option<NaiveDateTime>,
    severity: Option<&str>,
) -> QueryResult<Vec<WeatherAlert>> {
    let mut query = weather_alerts::table
        .select(WeatherAlert::as_select())
        .into_boxed();

    if let Some(now) = active_at {
        query = query
            .filter(weather_alerts::start_date.le(now))
            .filter(weather_alerts::end_date.ge(now));
    }

    if let Some(severity) = severity {
        query = query.filter(weather_alerts::severity.eq(severity.to_string()));
    }

    query
        .order((weather_alerts::start_date.desc(), weather_alerts::id.desc()))
        .load(conn)
}

pub fn get_weather_alert(conn: &mut PgConnection, id: i32) -> QueryResult<WeatherAlert> {
    weather_alerts::table
        .find(id)
        .select(WeatherAlert::as_select())
        .first(conn)
}
