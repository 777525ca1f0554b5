mod buffer_reader;
mod http_reader;
mod range_reader;

pub use buffer_reader::BufferRangeReader;
pub use http_reader::{create_http_client, HttpRangeReader, DEFAULT_HTTP_TIMEOUT};
pub use range_reader::{read_i32_le, read_u64_le, RangeReader};
