fn main() -> anyhow::Result<()> {
    wasmbench_cli::run()
}
