extern crate cbindgen;

fn main() {
    {
        use std::env;
        let root = env::var("CARGO_MANIFEST_DIR").unwrap();
        let _ = cbindgen::generate(&root)
            .map(|h| h.write_to_file("include/rpc3_core.h"))
            .map_err(|error_message| println!("cargo:warning={}", error_message));

        // generates the environment variable `DEP__RPC3_CORE_INCLUDE`; the
        // double `_` is due to `links = ""` being set empty in Cargo.toml.
        println!("cargo:RPC3_CORE_INCLUDE={}/include", root.as_str());
    }
}
