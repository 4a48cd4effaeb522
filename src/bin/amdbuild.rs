use anyhow::Result;

fn main() -> Result<()> {
    amdbuild::cli::run::<String>(None)
}
