//! [`StaticCatalog`]: a fixed product list, loaded from configuration.

use std::{collections::HashMap, convert::Infallible};

use crumb_core::{
  ProductId,
  external::{Catalog, Product},
};

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
  products: HashMap<ProductId, Product>,
}

impl StaticCatalog {
  pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
    Self {
      products: products
        .into_iter()
        .map(|p| (p.product_id.clone(), p))
        .collect(),
    }
  }

  pub fn len(&self) -> usize { self.products.len() }

  pub fn is_empty(&self) -> bool { self.products.is_empty() }
}

impl Catalog for StaticCatalog {
  type Error = Infallible;

  async fn get_product(
    &self,
    product_id: ProductId,
  ) -> Result<Option<Product>, Infallible> {
    Ok(self.products.get(&product_id).cloned())
  }
}
