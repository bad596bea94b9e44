pub mod ffmpeg;
pub mod registry;

#[cfg(test)]
pub mod testing;
