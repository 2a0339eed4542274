use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        discounts::{ApplyDiscountRequest, DiscountApplied, DiscountList, DiscountRequest},
        orders::{
            CreateOrderRequest, OrderItemRequest, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList},
    },
    entity::{discounts::DiscountType, orders::OrderStatus},
    models::{Cart, CartItem, Discount, Order, OrderItem, Product},
    response::{ApiResponse, Deleted, Meta, ResponseStatus},
    routes::{cart, discounts, health, orders, params, products as product_routes},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        discounts::apply_discount,
        discounts::list_discounts,
        discounts::search_discounts,
        discounts::create_discount,
        discounts::get_discount,
        discounts::update_discount,
        discounts::delete_discount,
        orders::create_order,
        orders::list_orders,
        orders::list_user_orders,
        orders::search_orders,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order
    ),
    components(
        schemas(
            Product,
            Cart,
            CartItem,
            Discount,
            DiscountType,
            Order,
            OrderItem,
            OrderStatus,
            AddToCartRequest,
            UpdateCartItemRequest,
            DiscountRequest,
            ApplyDiscountRequest,
            DiscountApplied,
            DiscountList,
            CreateOrderRequest,
            OrderItemRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            CreateProductRequest,
            ProductList,
            params::Pagination,
            params::DiscountQuery,
            params::OrderListQuery,
            params::OrderSearchQuery,
            Meta,
            ResponseStatus,
            Deleted,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<Discount>,
            ApiResponse<DiscountList>,
            ApiResponse<DiscountApplied>,
            ApiResponse<Order>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Deleted>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Discounts", description = "Discount code endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
