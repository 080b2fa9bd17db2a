/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Graph 推理/训练模式与作用域切换
 */

use super::Graph;

impl Graph {
    pub const fn set_train_mode(&mut self) {
        self.is_eval_mode = false;
    }

    pub const fn set_eval_mode(&mut self) {
        self.is_eval_mode = true;
    }

    pub const fn is_train_mode(&self) -> bool {
        !self.is_eval_mode
    }

    pub const fn is_eval_mode(&self) -> bool {
        self.is_eval_mode
    }

    /// 作用域内的模式切换：`f`运行期间图处于给定模式，结束后（无论正常
    /// 返回还是提前以错误返回）恢复先前模式。
    pub fn scoped_mode<F, R>(&mut self, eval: bool, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let was_eval = self.is_eval_mode;
        self.is_eval_mode = eval;
        let result = f(self);
        self.is_eval_mode = was_eval;
        result
    }
}
