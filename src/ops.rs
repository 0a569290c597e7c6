// Compound assignment operators for the observable wrappers.
//
// Each generated impl routes through the wrapper's `mutate`, which publishes
// the change around the actual operation. The bracketed bounds are carried as
// one token tree so they can be repeated once per operator.

macro_rules! compound_assign {
    ($target:ident $bounds:tt => $($op:ident :: $method:ident),+ $(,)?) => {
        $( compound_assign!(@one $target $bounds $op $method); )+
    };
    (@one $target:ident [$($bounds:tt)*] $op:ident $method:ident) => {
        impl<T: std::ops::$op $($bounds)*> std::ops::$op<T> for $target<T> {
            fn $method(&mut self, rhs: T) {
                self.mutate(|value| std::ops::$op::$method(value, rhs));
            }
        }
    };
}
