pub mod console;
pub mod window;
