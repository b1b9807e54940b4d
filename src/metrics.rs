#[cfg(feature = "export-metrics")]
macro_rules! create_metrics {
    (
        $(
            $type:ident $name:ident
        ),*
        $(,)?
    ) => {
        use lazy_static::lazy_static;
        use metrics::{counter, Counter as counter};

        lazy_static! {
            pub static ref METRICS: Metrics = Metrics::new();
        }

        pub struct Metrics {
            $(
                pub $name: $type,
            )*
        }

        impl Metrics {
            pub fn new() -> Self {
                Self {
                    $(
                        $name: $type!(
                            concat!("cc_", stringify!($name))
                        ),
                    )*
                }
            }
        }
    };
}

#[cfg(not(feature = "export-metrics"))]
macro_rules! create_metrics {
    (
        $(
            $type:ident $name:ident
        ),*
        $(,)?
    ) => {
        pub static METRICS: Metrics = Metrics::new();
        pub struct Dummy;
        impl Dummy {
            pub fn increment<T>(&self, _: T) {}
        }
        pub struct Metrics {
            $(
                pub $name: Dummy,
            )*
        }

        impl Metrics {
            pub const fn new() -> Self {
                Self {
                    $(
                        $name: Dummy,
                    )*
                }
            }
        }
    };
}

create_metrics!(
    counter cutbacks,
    counter loss_events_ignored,
    counter slow_start_exits,
    counter app_limited_events,
    counter rto_collapses,
    counter connection_migrations,
    counter hysteria_punish_events,
    counter hysteria_jitter_suppressions,
);
