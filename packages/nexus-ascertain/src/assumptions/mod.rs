pub mod charsets;
