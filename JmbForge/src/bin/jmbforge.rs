fn main() -> anyhow::Result<()> {
    jmbforge::cli::run_cli()
}
