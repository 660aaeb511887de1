mod flat_buffer_2d;

pub use flat_buffer_2d::FlatBuffer2D;
