fn main() -> anyhow::Result<()> {
    chromium_sync::cli::run()
}
