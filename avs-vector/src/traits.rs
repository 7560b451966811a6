/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

/// An overloadable, 2-argument distance function with a parameterized return type.
///
/// Pure distance functions depend only on the values of the argument and the type of the
/// return value.
pub trait PureDistanceFunction<Left, Right, To = f32> {
    fn evaluate(x: Left, y: Right) -> To;
}
