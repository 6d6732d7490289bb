fn main() -> ructe::Result<()> {
    let mut ructe = ructe::Ructe::from_env()?;
    ructe.compile_templates("templates")?;
    // style.css is served as-is from the generated statics module.
    ructe.statics()?.add_files("templates")
}
