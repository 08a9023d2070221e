pub mod bit_writer;
pub mod growth;
