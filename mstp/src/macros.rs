// Generates a transparent newtype over an integer with a set of named code
// points. Unknown values are representable, which is what the codec needs
// when it classifies octets coming off the wire.
macro_rules! enum_sim {
    (
        $(#[$enum_attr: meta])*
        pub struct $tname:ident ($size_t:ty) {
            $(
                $(#[$arm_attr: meta])*
                $enum_arm:ident = $num_exp:expr
            ),+ $(,)?
        }
    ) => {
        #[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
        $(#[$enum_attr])*
        pub struct $tname($size_t);

        impl $tname {
            $(
                $(#[$arm_attr])*
                pub const $enum_arm: Self = Self($num_exp);
            )+

            /// Get the raw value.
            #[inline]
            pub const fn raw(&self) -> $size_t {
                self.0
            }

            /// Whether the value is one of the named code points.
            #[inline]
            pub fn is_known(&self) -> bool {
                $(self.0 == $num_exp)||+
            }
        }

        impl ::core::convert::From<$size_t> for $tname {
            #[inline]
            fn from(value: $size_t) -> $tname {
                $tname(value)
            }
        }

        impl ::core::convert::From<$tname> for $size_t {
            #[inline]
            fn from(value: $tname) -> $size_t {
                value.0
            }
        }

        impl ::core::fmt::Display for $tname {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                $(
                    if self.0 == $num_exp {
                        return f.write_str(stringify!($enum_arm));
                    }
                )+
                write!(f, "{:#04x}", self.0)
            }
        }
    };
}
