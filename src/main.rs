use anyhow::Context;

fn main() -> anyhow::Result<()> {
    gymglow::run().context("gymglow exited with an error")
}
