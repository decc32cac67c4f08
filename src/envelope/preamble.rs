//! Debug-disabling statements placed before the decoder.

use tracing::warn;

use crate::configuration::DebugDisablingConfig;

const ERROR_REPORTING: &str =
    "error_reporting(0);ini_set('display_errors',0);ini_set('log_errors',0);";

const XDEBUG: &str = "if(function_exists('xdebug_disable')){xdebug_disable();}";

const DEBUG_BACKTRACE: &str =
    "if(function_exists('debug_backtrace')){ini_set('debug_backtrace',0);}";

// A user function may not redeclare a built-in, so the stub is only defined
// where the built-in is missing.
const VAR_DUMP: &str = "if(!function_exists('var_dump')){function var_dump(){return null;}}";

const PRINT_R: &str = "if(!function_exists('print_r')){function print_r(){return null;}}";

const ANTI_DEBUG: &str = concat!(
    "$_debug_detected=false;",
    "if(isset($_SERVER['HTTP_X_FORWARDED_FOR'])||isset($_SERVER['HTTP_X_REAL_IP'])",
    "||isset($_SERVER['HTTP_CLIENT_IP'])){$_debug_detected=true;}",
    "if(function_exists('get_included_files')&&count(get_included_files())>50)",
    "{$_debug_detected=true;}",
    "if(isset($_SERVER['REQUEST_TIME_FLOAT'])",
    "&&microtime(true)-$_SERVER['REQUEST_TIME_FLOAT']>30){$_debug_detected=true;}",
    "if($_debug_detected){http_response_code(404);exit;}",
);

/// Concatenated snippets for the enabled toggles, in a fixed order. Empty
/// when debug disabling is off.
pub fn build_preamble(config: &DebugDisablingConfig) -> String {
    let mut preamble = String::new();
    if !config.enabled {
        return preamble;
    }

    if config.disable_error_reporting {
        preamble.push_str(ERROR_REPORTING);
    }
    if config.disable_xdebug {
        preamble.push_str(XDEBUG);
    }
    if config.disable_debug_backtrace {
        preamble.push_str(DEBUG_BACKTRACE);
    }
    if config.disable_var_dump {
        preamble.push_str(VAR_DUMP);
    }
    if config.disable_print_r {
        preamble.push_str(PRINT_R);
    }
    if config.disable_die_exit {
        warn!("disable_die_exit has no effect: die and exit are language constructs");
    }
    if config.inject_anti_debug_code {
        preamble.push_str(ANTI_DEBUG);
    }

    preamble
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_empty() {
        assert_eq!(build_preamble(&DebugDisablingConfig::disabled()), "");
    }

    #[test]
    fn test_order_and_content() {
        let preamble = build_preamble(&DebugDisablingConfig::default());
        let error = preamble.find("error_reporting(0)").unwrap();
        let xdebug = preamble.find("xdebug_disable()").unwrap();
        let dump = preamble.find("function var_dump").unwrap();
        let anti = preamble.find("http_response_code(404);exit;").unwrap();
        assert!(error < xdebug && xdebug < dump && dump < anti);
        assert!(preamble.contains("if(!function_exists('print_r'))"));
        assert!(preamble.contains("count(get_included_files())>50"));
        assert!(preamble.contains("['REQUEST_TIME_FLOAT']>30"));
        assert!(!preamble.contains("function die"));
    }

    #[test]
    fn test_single_toggle() {
        let config = DebugDisablingConfig {
            enabled: true,
            disable_error_reporting: false,
            disable_xdebug: true,
            disable_debug_backtrace: false,
            disable_var_dump: false,
            disable_print_r: false,
            disable_die_exit: false,
            inject_anti_debug_code: false,
        };
        assert_eq!(build_preamble(&config), XDEBUG);
    }
}
