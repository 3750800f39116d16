pub const MESA_DISPLAY_VERSION: &str = env!("MESA_DISPLAY_VERSION");
pub const MESA_BUILD_N: &str = env!("MESA_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "MESA-Designer {}\nBuild {}\nMESA receptor construct designer",
        MESA_DISPLAY_VERSION, MESA_BUILD_N
    )
}
