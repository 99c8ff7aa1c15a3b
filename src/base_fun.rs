/// Угол чуть меньше PI/2, чтобы tan оставался конечным
pub const NN_THETA: f32 = 1.57079;
/// Кол. параметров одной базовой функции
pub const NB_PARAM_BASE: usize = 3;

/// Базовая функция сети:
/// f(x) = {tan(p[0]*NN_THETA)*(x+p[1])+p[2]} в [-1,1]
/// p[0] - крутизна, p[1] - сдвиг по горизонтали, p[2] - сдвиг по вертикали.
/// `param` - как минимум NB_PARAM_BASE значений в [-1,1]
#[inline]
pub fn base_fun(param: &[f32], x: f32) -> f32 {
    debug_assert!(param.len() >= NB_PARAM_BASE);
    ((param[0] * NN_THETA).tan() * (x + param[1]) + param[2]).clamp(-1.0, 1.0)
}
