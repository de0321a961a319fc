use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::realtime::sse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marketbooth API",
        description = r#"
Backend for multi-brand food booth businesses: point-of-sale, warehouse
and booth inventory, accounting ledgers, and realtime stock/sale/menu
broadcasting over Server-Sent Events.

Authenticate via `POST /api/v1/auth/login`; the issued JWT is accepted
either as a `Bearer` token or via the `auth-token` cookie.
"#
    ),
    paths(
        handlers::auth::login,
        handlers::auth::me,
        handlers::ingredients::list_ingredients,
        handlers::ingredients::low_stock_ingredients,
        handlers::ingredients::purchase_ingredient,
        handlers::sales::list_sales,
        handlers::sales::create_sale,
        handlers::sales::update_sale,
        handlers::sales::delete_sale,
        handlers::stock::allocate_booth_stock,
        sse::realtime_events,
        sse::menu_events,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        handlers::auth::LoginRequest,
        crate::services::sales::CreateSaleInput,
        crate::services::sales::UpdateSaleInput,
        crate::services::sales::SaleLineInput,
        crate::services::sales::PaymentMethod,
        crate::services::booth_stock::AllocateStockInput,
        crate::services::ingredients::PurchaseIngredientInput,
    )),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "ingredients", description = "Warehouse ingredient management"),
        (name = "sales", description = "Sales terminal"),
        (name = "stock", description = "Booth stock"),
        (name = "realtime", description = "Server-Sent Event streams"),
    )
)]
pub struct ApiDoc;

/// Swagger UI router mounted at `/swagger-ui`
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
