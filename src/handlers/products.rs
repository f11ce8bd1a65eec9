use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::auth::{require_role, AuthUser};
use crate::db::models::{NewProduct, UpdateProduct};
use crate::db::repository;
use crate::handlers::record_id;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateProductRequest, ProductCategory, ProductQuery, Role, UpdateProductRequest};
use crate::state::AppState;

pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    if let Some(category) = &query.category {
        if category.parse::<ProductCategory>().is_err() {
            return Err(ApiError::invalid_field(
                "category",
                "must be one of: Seeds, Fertilizers, Pesticides",
            ));
        }
    }

    let products = state
        .run(move |conn| {
            Ok(repository::list_products(
                conn,
                query.category.as_deref(),
                query.search.as_deref().filter(|s| !s.trim().is_empty()),
            )?)
        })
        .await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn get_one(state: web::Data<AppState>, path: web::Path<i32>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let product = state
        .run(move |conn| {
            repository::get_product(conn, id).map_err(|e| match ApiError::from(e) {
                ApiError::NotFound(_) => ApiError::NotFound("Product not found".to_string()),
                other => other,
            })
        })
        .await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: Result<web::Json<CreateProductRequest>, actix_web::Error>,
) -> ApiResult<HttpResponse> {
    require_role(&user, Role::Admin)?;
    let req = body.map_err(ApiError::from_extractor)?.into_inner();
    req.validate()?;

    let new_product = NewProduct {
        name: req.name.trim().to_string(),
        category: req.category,
        price: req.price,
        stock: req.stock,
        image_url: req.image_url,
        description: req.description,
    };
    let id = state
        .run(move |conn| Ok(repository::insert_product(conn, &new_product)?))
        .await?;

    info!(product_id = id, admin_id = user.id, "product created");
    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    body: Result<web::Json<UpdateProductRequest>, actix_web::Error>,
) -> ApiResult<HttpResponse> {
    require_role(&user, Role::Admin)?;
    let req = body.map_err(ApiError::from_extractor)?.into_inner();
    req.validate()?;

    let changes = UpdateProduct {
        name: req.name.map(|n| n.trim().to_string()),
        category: req.category,
        price: req.price,
        stock: req.stock,
        image_url: req.image_url,
        description: req.description,
    };
    let id = record_id(&path, "Product not found")?;
    let product = state
        .run(move |conn| {
            repository::update_product(conn, id, &changes).map_err(|e| match ApiError::from(e) {
                ApiError::NotFound(_) => ApiError::NotFound("Product not found".to_string()),
                other => other,
            })
        })
        .await?;

    info!(product_id = id, admin_id = user.id, "product updated");
    Ok(HttpResponse::Ok().json(product))
}
