//! Build script for trackcache.
//!
//! On Windows, embeds `trackcache.manifest` (via `trackcache.rc`) so the
//! binary is `longPathAware`. Music libraries nest artist/album/disc folders
//! deep enough to cross the 260-character MAX_PATH limit. Other platforms
//! need nothing.

fn main() {
    #[cfg(windows)]
    {
        embed_resource::compile("trackcache.rc", embed_resource::NONE);

        println!("cargo:rerun-if-changed=trackcache.rc");
        println!("cargo:rerun-if-changed=trackcache.manifest");
    }
}
