use super::value::FieldValue;
use super::TType;

/// One method per [`super::WireValue`] variant. This is the only sanctioned
/// dispatch mechanism for protocol-independent value walks; a protocol
/// codec implements this trait instead of matching on `WireValue` itself,
/// which keeps future encodings (compact, JSON) additive rather than
/// requiring changes to the value types.
pub trait ValueVisitor<R> {
    fn visit_bool(&mut self, value: bool) -> R;
    fn visit_byte(&mut self, value: i8) -> R;
    fn visit_double(&mut self, value: f64) -> R;
    fn visit_i16(&mut self, value: i16) -> R;
    fn visit_i32(&mut self, value: i32) -> R;
    fn visit_i64(&mut self, value: i64) -> R;
    fn visit_binary(&mut self, value: &[u8]) -> R;
    fn visit_struct(&mut self, fields: &[FieldValue]) -> R;
    fn visit_map(&mut self, key_ttype: TType, value_ttype: TType, pairs: &[(super::WireValue, super::WireValue)]) -> R;
    fn visit_set(&mut self, value_ttype: TType, values: &[super::WireValue]) -> R;
    fn visit_list(&mut self, value_ttype: TType, values: &[super::WireValue]) -> R;
}
