fn main() -> anyhow::Result<()> {
    pointwatch_lib::run()
}
