pub mod image_converter;
