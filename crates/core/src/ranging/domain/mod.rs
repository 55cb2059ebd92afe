pub mod ranging_error;
pub mod similar_triangles;
