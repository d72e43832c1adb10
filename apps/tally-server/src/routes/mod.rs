//! HTTP routes.
//!
//! | Method & path                         | Handler                    |
//! |---------------------------------------|----------------------------|
//! | `POST /sales`, `GET /sales`           | [`sales`]                  |
//! | `GET/PUT/DELETE /sales/{id}`          | [`sales`]                  |
//! | `/products…`                          | [`catalog`]                |
//! | `/customers…`, `/suppliers…`          | [`parties`]                |
//! | `/deleted-items…`                     | [`archive`]                |
//! | `GET /health`                         | [`health`]                 |

pub mod archive;
pub mod catalog;
pub mod health;
pub mod parties;
pub mod sales;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Sales
        .route("/sales", post(sales::create_sale).get(sales::list_sales))
        .route(
            "/sales/{id}",
            get(sales::get_sale).put(sales::update_sale).delete(sales::delete_sale),
        )
        // Catalogue
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        // Customers
        .route("/customers", get(parties::list_customers).post(parties::create_customer))
        .route(
            "/customers/{id}",
            get(parties::get_customer).delete(parties::delete_customer),
        )
        .route("/customers/{id}/history", get(parties::customer_history))
        .route("/customers/{id}/payments", post(parties::customer_payment))
        // Suppliers
        .route("/suppliers", get(parties::list_suppliers).post(parties::create_supplier))
        .route(
            "/suppliers/{id}",
            get(parties::get_supplier).delete(parties::delete_supplier),
        )
        .route("/suppliers/{id}/history", get(parties::supplier_history))
        .route("/suppliers/{id}/payments", post(parties::supplier_payment))
        .route("/suppliers/{id}/purchases", post(parties::supplier_purchase))
        // Archive
        .route("/deleted-items", get(archive::list_deleted))
        .route(
            "/deleted-items/{id}",
            get(archive::get_deleted).delete(archive::purge),
        )
        .route("/deleted-items/{id}/restore", post(archive::restore))
}
