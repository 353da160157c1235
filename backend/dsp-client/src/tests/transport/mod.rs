mod line_reader;
mod stream;
