fn main() {
    env_logger::init();
    quill::cli::run();
}
