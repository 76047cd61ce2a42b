fn main() -> Result<(), Box<dyn std::error::Error>> {
    tunebridge::runtime::run()
}
