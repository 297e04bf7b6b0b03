//! ANSI colour palette shared by the diagnostic renderer and the
//! token/AST printers.

pub const RESET: &str = "\x1b[0m";

pub const FG_WHITE: &str = "\x1b[0;97m";
pub const FG_BLUE: &str = "\x1b[0;94m";
pub const FG_RED: &str = "\x1b[0;91m";
pub const FG_GREEN: &str = "\x1b[0;92m";
pub const FG_CYAN: &str = "\x1b[0;96m";
pub const FG_PURPLE: &str = "\x1b[0;95m";

pub const FG_RED_BOLD: &str = "\x1b[1;91m";
pub const FG_GREEN_BOLD: &str = "\x1b[1;92m";
pub const FG_BLUE_BOLD: &str = "\x1b[1;94m";
pub const FG_PURPLE_BOLD: &str = "\x1b[1;95m";

pub const BG_RED: &str = "\x1b[0;101m";
pub const BG_GREEN: &str = "\x1b[0;102m";
