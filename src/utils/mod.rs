pub mod board_cache;
