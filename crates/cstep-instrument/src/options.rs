//! Per-pass instrumentation options.

use cstep_core::config::InstrumentConfig;

/// How one pass names and shapes the code it generates.
///
/// This is the `[instrument]` table of `cstep.toml` as the pass sees it;
/// the defaults match the configuration defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentOptions {
    /// Prefix of the hook functions, `notify_` gives `notify_0` .. `notify_N`.
    pub notify_prefix: String,
    /// Prefix of generated temporaries.
    pub temp_prefix: String,
    /// Largest number of pointer parameters one hook call may carry.
    pub max_notify_arity: usize,
    /// Prepend forward declarations of the hooks.
    pub emit_prelude: bool,
    /// Report the size of every captured type on entry to `main`.
    pub emit_type_events: bool,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        InstrumentOptions::from(&InstrumentConfig::default())
    }
}

impl From<&InstrumentConfig> for InstrumentOptions {
    fn from(config: &InstrumentConfig) -> Self {
        InstrumentOptions {
            notify_prefix: config.notify_prefix.clone(),
            temp_prefix: config.temp_prefix.clone(),
            max_notify_arity: config.max_notify_arity,
            emit_prelude: config.emit_prelude,
            emit_type_events: config.emit_type_events,
        }
    }
}

impl InstrumentOptions {
    /// Name of the hook taking `arity` pointer parameters.
    pub fn hook(&self, arity: usize) -> String {
        format!("{}{}", self.notify_prefix, arity)
    }

    /// Forward declarations of every hook, one per line.
    pub fn prelude(&self) -> String {
        let mut out = String::new();
        for arity in 0..=self.max_notify_arity {
            let params: Vec<String> = std::iter::once("int ref".to_string())
                .chain((1..=arity).map(|i| format!("void *p{}", i)))
                .collect();
            out.push_str(&format!("void {}({});\n", self.hook(arity), params.join(", ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_config_table() {
        let options = InstrumentOptions::default();
        assert_eq!(options.notify_prefix, "notify_");
        assert_eq!(options.temp_prefix, "temp");
        assert_eq!(options.max_notify_arity, 10);
        assert!(options.emit_prelude);
        assert!(options.emit_type_events);
    }

    #[test]
    fn prelude_declares_every_arity() {
        let options = InstrumentOptions {
            max_notify_arity: 2,
            ..InstrumentOptions::default()
        };
        assert_eq!(
            options.prelude(),
            "void notify_0(int ref);\nvoid notify_1(int ref, void *p1);\nvoid notify_2(int ref, void *p1, void *p2);\n"
        );
    }
}
