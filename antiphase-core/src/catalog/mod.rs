pub mod endpoint_catalog;
