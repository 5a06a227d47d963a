use bot_commons::*;

fn main() {
    start_everything("WARN,movie_store_bot=debug", movie_store_bot::entry());
}
