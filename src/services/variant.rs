//! Size/color eligibility shared by the cart and the order engines.

use crate::{
    entity::products::{Model as ProductModel, VariantList},
    error::{AppError, AppResult},
};

/// Trims a selected variant, treating blank input as "not selected".
pub fn normalize_variant(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A selection is only checked when the product declares options for that attribute.
pub fn ensure_variant_available(
    product: &ProductModel,
    size: Option<&str>,
    color: Option<&str>,
) -> AppResult<()> {
    check_attribute("Size", &product.sizes, size, &product.name)?;
    check_attribute("Color", &product.colors, color, &product.name)
}

fn check_attribute(
    label: &str,
    declared: &VariantList,
    selected: Option<&str>,
    product_name: &str,
) -> AppResult<()> {
    match selected {
        Some(value) if !declared.is_empty() && !declared.contains(value) => Err(
            AppError::InvalidVariant(format!(
                "{label} \"{value}\" is not available for product {product_name}"
            )),
        ),
        _ => Ok(()),
    }
}
