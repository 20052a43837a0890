use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    vergen_gitcl::Emitter::default()
        .add_instructions(&vergen_gitcl::GitclBuilder::default().sha(true).build()?)?
        .emit()?;

    let target = env::var("TARGET")?;
    println!("cargo:rustc-env=DEBSMITH_TARGET={target}");
    Ok(())
}
