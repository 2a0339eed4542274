pub mod cart_service;
pub mod discount_service;
pub mod order_service;
pub mod product_service;
pub mod variant;
