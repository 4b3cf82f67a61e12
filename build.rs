// build.rs - Tell cargo to recompile when template files change
fn main() {
    println!("cargo:rerun-if-changed=templates/style.css");
    println!("cargo:rerun-if-changed=templates/script.js");
}
